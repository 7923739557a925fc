use crate::function::Function;
use std::fs;
use std::io;
use std::path::Path;

pub fn save_function(function: &Function, path: impl AsRef<Path>) -> io::Result<()> {
    let json = serde_json::to_string_pretty(function)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    fs::write(path, json)?;
    Ok(())
}

pub fn load_function(path: impl AsRef<Path>) -> io::Result<Function> {
    let json = fs::read_to_string(path)?;
    let function =
        serde_json::from_str(&json).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    Ok(function)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::FunctionBuilder;
    use tempfile::NamedTempFile;

    #[test]
    fn test_save_load_function() {
        let mut func = FunctionBuilder::new("roundtrip");

        {
            let mut entry = func.entry_block();
            let value = entry.load("x");
            entry.store("y", value);
            entry.return_void();
        }

        let function = func.build().unwrap();
        let temp_file = NamedTempFile::new().unwrap();

        save_function(&function, temp_file.path()).unwrap();

        let loaded = load_function(temp_file.path()).unwrap();
        assert_eq!(loaded, function);
    }
}
