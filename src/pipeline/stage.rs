//! Stage and graph declarations
//!
//! A [`GraphSpec`] is plain data: which stages exist, how each one is
//! configured, which links are fixed at construction time and which source
//! pad gets linked once the framework discovers it.

use crate::error::BuildError;

/// Processing role of a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    /// URI source that demuxes and decodes, exposing pads at runtime
    Decode,
    /// Colorspace conversion
    Convert,
    /// Video scaling
    Scale,
    /// Caps restriction (e.g. forcing the scaled resolution)
    Filter,
    /// Frame rate adjustment
    Rate,
    /// Video encoder
    Encode,
    /// RTP payloader
    Packetize,
    /// Terminal sink (network or display)
    Sink,
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StageKind::Decode => "decode",
            StageKind::Convert => "convert",
            StageKind::Scale => "scale",
            StageKind::Filter => "filter",
            StageKind::Rate => "rate-adjust",
            StageKind::Encode => "encode",
            StageKind::Packetize => "packetize",
            StageKind::Sink => "sink",
        };
        write!(f, "{}", name)
    }
}

/// Media caps restriction, e.g. `video/x-raw,width=640,height=360`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapsSpec {
    pub media_type: String,
    pub int_fields: Vec<(String, i32)>,
}

impl CapsSpec {
    pub fn new(media_type: impl Into<String>) -> Self {
        Self {
            media_type: media_type.into(),
            int_fields: Vec::new(),
        }
    }

    pub fn with_int(mut self, name: impl Into<String>, value: i32) -> Self {
        self.int_fields.push((name.into(), value));
        self
    }
}

impl std::fmt::Display for CapsSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.media_type)?;
        for (name, value) in &self.int_fields {
            write!(f, ",{}={}", name, value)?;
        }
        Ok(())
    }
}

/// Value of a stage property
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    Str(String),
    Int(i32),
    Bool(bool),
    Caps(CapsSpec),
}

/// Declaration of a single stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSpec {
    /// Unique name inside the graph
    pub name: String,
    pub kind: StageKind,
    /// Framework factory used to instantiate the stage (e.g. `videoconvert`)
    pub factory: String,
    pub properties: Vec<(String, PropertyValue)>,
}

impl StageSpec {
    pub fn new(name: impl Into<String>, kind: StageKind, factory: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            factory: factory.into(),
            properties: Vec::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: PropertyValue) -> Self {
        self.properties.push((key.into(), value));
        self
    }

    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }
}

/// Deferred link from a source stage's runtime pads to an entry stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicLinkSpec {
    pub source: String,
    pub entry: String,
    /// Media type prefix a discovered pad must carry to be linked
    pub media_prefix: String,
}

/// Full declaration of a graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphSpec {
    pub name: String,
    pub stages: Vec<StageSpec>,
    /// Static links as (upstream, downstream) stage names
    pub links: Vec<(String, String)>,
    pub dynamic: Option<DynamicLinkSpec>,
}

impl GraphSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
            links: Vec::new(),
            dynamic: None,
        }
    }

    pub fn stage(mut self, stage: StageSpec) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn link(mut self, upstream: &str, downstream: &str) -> Self {
        self.links.push((upstream.to_string(), downstream.to_string()));
        self
    }

    /// Link every consecutive pair of the given stages
    pub fn chain(mut self, names: &[&str]) -> Self {
        for pair in names.windows(2) {
            self.links.push((pair[0].to_string(), pair[1].to_string()));
        }
        self
    }

    pub fn dynamic(mut self, source: &str, entry: &str, media_prefix: &str) -> Self {
        self.dynamic = Some(DynamicLinkSpec {
            source: source.to_string(),
            entry: entry.to_string(),
            media_prefix: media_prefix.to_string(),
        });
        self
    }

    pub fn find(&self, name: &str) -> Option<&StageSpec> {
        self.stages.iter().find(|s| s.name == name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.stages.iter().position(|s| s.name == name)
    }

    /// Check names are unique and every link endpoint is declared
    pub fn validate(&self) -> Result<(), BuildError> {
        for (i, stage) in self.stages.iter().enumerate() {
            if self.stages[..i].iter().any(|s| s.name == stage.name) {
                return Err(BuildError::DuplicateStage(stage.name.clone()));
            }
        }

        let endpoints = self
            .links
            .iter()
            .flat_map(|(up, down)| [up, down])
            .chain(self.dynamic.iter().flat_map(|d| [&d.source, &d.entry]));
        for name in endpoints {
            if self.find(name).is_none() {
                return Err(BuildError::UnknownStage(name.clone()));
            }
        }

        Ok(())
    }
}
