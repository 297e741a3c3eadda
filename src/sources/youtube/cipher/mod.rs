//! Signature deciphering.
//!
//! ```text
//! src/sources/youtube/cipher/
//! ├── mod.rs      ← Decipher trait + SignatureDecipherer
//! ├── builder.rs  ← player script → TransformProgram (staged extraction)
//! └── program.rs  ← Transform / TransformProgram replay engine
//! ```

pub mod builder;
pub mod program;

use std::sync::Arc;

pub use builder::build_program;
pub use program::{Transform, TransformKind, TransformProgram};

use crate::common::{
    errors::{ApplyError, ExtractionError},
    observer::{Event, Observer},
};

/// Turns an obfuscated signature into a valid one.
///
/// Streams hold this as `Arc<dyn Decipher>` so tests can count calls.
pub trait Decipher: Send + Sync {
    fn decipher(&self, signature: &str) -> Result<String, ApplyError>;
}

/// A compiled player script. Build it once per script and share it between
/// every stream of the video.
#[derive(Debug, Clone)]
pub struct SignatureDecipherer {
    program: TransformProgram,
}

impl SignatureDecipherer {
    pub fn new(program: TransformProgram, observer: Arc<dyn Observer>) -> Self {
        observer.notify(Event::ProgramBuilt {
            operations: program.len(),
        });
        Self { program }
    }

    pub fn from_script(script: &str, observer: Arc<dyn Observer>) -> Result<Self, ExtractionError> {
        match build_program(script) {
            Ok(program) => Ok(Self::new(program, observer)),
            Err(e) => {
                observer.notify(Event::ProgramFailed {
                    reason: &e.to_string(),
                });
                Err(e)
            }
        }
    }

    pub fn program(&self) -> &TransformProgram {
        &self.program
    }
}

impl Decipher for SignatureDecipherer {
    fn decipher(&self, signature: &str) -> Result<String, ApplyError> {
        self.program.run(signature)
    }
}
