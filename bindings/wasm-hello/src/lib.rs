//! wasm-bindgen binding for the `hello` export.
//!
//! The generated glue exposes `hello(name?)` as a module export. Hosts that
//! prefer to own the export object can instead call `registerExports(target)`
//! once and receive `target.hello`.

use hello_export::{BindingError, ExportedFunction, Registrar};
use js_sys::{Object, Reflect};
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
}

#[wasm_bindgen]
pub fn hello(name: Option<String>) -> String {
    hello_export::hello(name.as_deref())
}

/// Installs the module's exports onto `target`.
#[wasm_bindgen(js_name = registerExports)]
pub fn register_exports(target: &Object) -> Result<(), JsValue> {
    let mut exports = JsExportObject::new(target);
    hello_export::init(&mut exports).map_err(to_js_error)
}

/// A JS object acting as the host's export table.
pub struct JsExportObject<'a> {
    target: &'a Object,
}

impl<'a> JsExportObject<'a> {
    pub fn new(target: &'a Object) -> Self {
        Self { target }
    }
}

impl Registrar for JsExportObject<'_> {
    fn register(&mut self, export: ExportedFunction) -> Result<(), BindingError> {
        let key = JsValue::from_str(export.name());

        let taken = Reflect::has(self.target, &key).map_err(js_failure)?;
        if taken {
            return Err(BindingError::DuplicateExport {
                name: export.name().to_string(),
            });
        }

        let callable = Closure::<dyn Fn(JsValue) -> Result<String, JsValue>>::new(
            move |arg: JsValue| -> Result<String, JsValue> {
                let arg = text_argument(&arg)?;
                Ok(export.invoke(arg.as_deref()))
            },
        );

        // into_js_value hands ownership of the closure to the JS heap
        let installed =
            Reflect::set(self.target, &key, &callable.into_js_value()).map_err(js_failure)?;
        if !installed {
            return Err(BindingError::host(format!(
                "export object refused property `{}`",
                export.name()
            )));
        }

        tracing::debug!(name = export.name(), "installed export on JS object");
        Ok(())
    }
}

fn text_argument(arg: &JsValue) -> Result<Option<String>, JsValue> {
    if arg.is_undefined() || arg.is_null() {
        return Ok(None);
    }
    arg.as_string()
        .map(Some)
        .ok_or_else(|| JsValue::from_str("hello expects a string or no argument"))
}

fn js_failure(value: JsValue) -> BindingError {
    BindingError::host(
        value
            .as_string()
            .unwrap_or_else(|| "JavaScript error".to_string()),
    )
}

fn to_js_error(err: BindingError) -> JsValue {
    JsValue::from_str(&err.to_string())
}
