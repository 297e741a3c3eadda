use crate::common::errors::ApplyError;

/// Kind of a helper function, as recognized from its body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformKind {
    Reverse,
    Splice,
    Swap,
}

/// One primitive operation of a decipher procedure.
///
/// Every variant carries the numeric argument found at its call site.
/// `Reverse` ignores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    Reverse(usize),
    Splice(usize),
    Swap(usize),
}

impl Transform {
    pub fn new(kind: TransformKind, param: usize) -> Self {
        match kind {
            TransformKind::Reverse => Self::Reverse(param),
            TransformKind::Splice => Self::Splice(param),
            TransformKind::Swap => Self::Swap(param),
        }
    }

    pub fn kind(&self) -> TransformKind {
        match self {
            Self::Reverse(_) => TransformKind::Reverse,
            Self::Splice(_) => TransformKind::Splice,
            Self::Swap(_) => TransformKind::Swap,
        }
    }

    /// Applies the operation in place.
    pub fn apply(&self, units: &mut Vec<u8>) -> Result<(), ApplyError> {
        match *self {
            Self::Reverse(_) => units.reverse(),
            Self::Splice(n) => {
                if n >= units.len() {
                    return Err(ApplyError::IndexOutOfRange {
                        index: n,
                        len: units.len(),
                    });
                }
                units.drain(..n);
            }
            Self::Swap(n) => {
                if units.is_empty() {
                    return Err(ApplyError::EmptySequence);
                }
                let idx = n % units.len();
                units.swap(0, idx);
            }
        }
        Ok(())
    }
}

/// Ordered list of transforms compiled from one player script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformProgram {
    transforms: Vec<Transform>,
}

impl TransformProgram {
    pub fn new(transforms: Vec<Transform>) -> Self {
        Self { transforms }
    }

    pub fn transforms(&self) -> &[Transform] {
        &self.transforms
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Replays the program over the signature's bytes.
    pub fn run(&self, signature: &str) -> Result<String, ApplyError> {
        let mut units = signature.as_bytes().to_vec();
        for transform in &self.transforms {
            transform.apply(&mut units)?;
        }
        String::from_utf8(units).map_err(|_| ApplyError::InvalidUtf8)
    }
}
