//! Protobuf messages carried in each frame.

use compact_str::CompactString;
use hinomori_core::{ContentHash, FileRecord, Step as CoreStep};

use crate::error::WireError;

/// One framed step. Exactly one variant is populated.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Step {
    #[prost(oneof = "step::Step", tags = "1, 2, 3")]
    pub step: Option<step::Step>,
}

pub mod step {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Step {
        #[prost(message, tag = "1")]
        File(super::StepFile),
        #[prost(message, tag = "2")]
        Up(super::StepPathUp),
        #[prost(message, tag = "3")]
        Down(super::StepPathDown),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StepFile {
    #[prost(uint32, tag = "1")]
    pub mode: u32,
    #[prost(uint64, tag = "2")]
    pub size: u64,
    #[prost(string, tag = "3")]
    pub name: String,
    #[prost(bytes = "vec", tag = "4")]
    pub hash: Vec<u8>,
    #[prost(string, tag = "5")]
    pub hash_err: String,
    #[prost(uint32, tag = "6")]
    pub own: u32,
    #[prost(uint32, tag = "7")]
    pub grp: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StepPathUp {
    #[prost(uint32, tag = "1")]
    pub up: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StepPathDown {
    #[prost(string, tag = "1")]
    pub down: String,
}

impl From<&CoreStep> for Step {
    fn from(step: &CoreStep) -> Self {
        let inner = match step {
            CoreStep::File(record) => step::Step::File(StepFile {
                mode: record.mode,
                size: record.size,
                name: record.name.to_string(),
                hash: record
                    .hash
                    .map(|h| h.as_bytes().to_vec())
                    .unwrap_or_default(),
                hash_err: record.hash_error.clone().unwrap_or_default(),
                own: record.owner,
                grp: record.group,
            }),
            CoreStep::Up(up) => step::Step::Up(StepPathUp { up: *up }),
            CoreStep::Down(down) => step::Step::Down(StepPathDown { down: down.clone() }),
        };
        Step { step: Some(inner) }
    }
}

impl TryFrom<Step> for CoreStep {
    type Error = WireError;

    fn try_from(message: Step) -> Result<Self, Self::Error> {
        match message.step.ok_or(WireError::InvalidStep)? {
            step::Step::File(file) => {
                let hash = match file.hash.len() {
                    0 => None,
                    ContentHash::LEN => ContentHash::from_slice(&file.hash),
                    len => return Err(WireError::InvalidHashLength { len }),
                };
                Ok(CoreStep::File(FileRecord {
                    mode: file.mode,
                    size: file.size,
                    name: CompactString::from(file.name),
                    owner: file.own,
                    group: file.grp,
                    hash,
                    hash_error: Some(file.hash_err).filter(|e| !e.is_empty()),
                }))
            }
            step::Step::Up(up) => Ok(CoreStep::Up(up.up)),
            step::Step::Down(down) => Ok(CoreStep::Down(down.down)),
        }
    }
}
