use anyhow::{anyhow, bail, Result};
use wasmi::{Module, ValType};
use wasmparser::{Parser, Payload};

/// Rejects anything that is not a parseable wasm binary, and modules that
/// would run code of their own during instantiation.
pub fn validate_wasm(bytes: &[u8]) -> Result<()> {
    if bytes.len() < 4 || &bytes[0..4] != b"\0asm" {
        bail!("not a wasm binary (missing magic number)");
    }
    let engine = wasmi::Engine::default();
    Module::new(&engine, bytes).map_err(|e| anyhow!("wasm parse failed: {e}"))?;
    if let Some(func) = start_function(bytes)? {
        bail!("module has a start function (func {func}), which is not supported");
    }
    Ok(())
}

/// Index of the module's start function, if it declares one.
pub fn start_function(bytes: &[u8]) -> Result<Option<u32>> {
    for payload in Parser::new(0).parse_all(bytes) {
        match payload.map_err(|e| anyhow!("reading wasm sections: {e}"))? {
            Payload::StartSection { func, .. } => return Ok(Some(func)),
            Payload::End(_) => break,
            _ => {}
        }
    }
    Ok(None)
}

/// Names of the function exports with the text ABI shape `(i32, i32) -> i32`.
///
/// Allocator helpers have different shapes and are not listed.
pub fn text_exports(bytes: &[u8]) -> Result<Vec<String>> {
    let engine = wasmi::Engine::default();
    let module = Module::new(&engine, bytes)
        .map_err(|e| anyhow!("failed to parse module for exports: {e}"))?;
    Ok(text_exports_of(&module))
}

pub(crate) fn text_exports_of(module: &Module) -> Vec<String> {
    let mut names = Vec::new();
    for export in module.exports() {
        let Some(func_ty) = export.ty().func() else {
            continue;
        };
        if func_ty.params() == [ValType::I32, ValType::I32] && func_ty.results() == [ValType::I32]
        {
            names.push(export.name().to_string());
        }
    }
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_missing_magic() {
        let err = validate_wasm(b"not wasm").unwrap_err();
        assert!(err.to_string().contains("magic"));
    }

    #[test]
    fn test_validate_rejects_short_input() {
        assert!(validate_wasm(b"\0as").is_err());
    }

    #[test]
    fn test_validate_rejects_truncated_module() {
        // Magic number followed by a bogus version
        assert!(validate_wasm(b"\0asm\x07\0\0\0").is_err());
    }

    #[test]
    fn test_start_function_is_found() {
        let bytes = wat::parse_str(
            r#"(module
                (func $a)
                (func $boot)
                (start $boot))"#,
        )
        .unwrap();
        assert_eq!(start_function(&bytes).unwrap(), Some(1));

        let err = validate_wasm(&bytes).unwrap_err();
        assert!(err.to_string().contains("start function"));
    }

    #[test]
    fn test_module_without_start_passes() {
        let bytes = wat::parse_str(r#"(module (func (export "f")))"#).unwrap();
        assert_eq!(start_function(&bytes).unwrap(), None);
        validate_wasm(&bytes).unwrap();
    }

    #[test]
    fn test_text_exports_filters_by_shape() {
        let bytes = wat::parse_str(
            r#"(module
                (func (export "b_text") (param i32 i32) (result i32) i32.const 0)
                (func (export "a_text") (param i32 i32) (result i32) i32.const 0)
                (func (export "alloc") (param i32) (result i32) i32.const 0)
                (func (export "dealloc") (param i32 i32))
                (memory (export "memory") 1))"#,
        )
        .unwrap();
        assert_eq!(text_exports(&bytes).unwrap(), vec!["a_text", "b_text"]);
    }
}
