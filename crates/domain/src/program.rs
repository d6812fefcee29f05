//! Compiled program: the text uploaded to one controller.

use serde::{Deserialize, Serialize};

/// Program text for one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledProgram {
    /// Device the program runs on.
    pub owner: String,
    pub source: String,
}

impl CompiledProgram {
    /// File name the program is stored under, e.g. `D1.js`.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.js", self.owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_name_file_after_owner() {
        let program = CompiledProgram {
            owner: "entrance_left".to_string(),
            source: String::new(),
        };
        assert_eq!(program.file_name(), "entrance_left.js");
    }
}
