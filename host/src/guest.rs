use anyhow::{anyhow, bail, Context, Result};
use hello_export::{ExportDescriptor, ExportedFunction, EXPORT_NAME};
use tracing::{debug, info, warn};
use wasmi::{Linker, Memory, Module, Store, TypedFunc};

use crate::config::HostConfig;
use crate::inspect::{text_exports_of, validate_wasm};

/// Size of the little-endian length prefix on guest results.
const LEN_PREFIX: usize = 4;

/// A loaded guest module exposing the `hello` text export.
pub struct WasmHost {
    store: Store<()>,
    memory: Memory,
    alloc: TypedFunc<i32, i32>,
    dealloc: TypedFunc<(i32, i32), ()>,
    hello: TypedFunc<(i32, i32), i32>,
    exports: Vec<String>,
    config: HostConfig,
}

impl WasmHost {
    /// Parses and instantiates `bytes`, resolving the ABI exports.
    ///
    /// Modules with a start function are refused before instantiation;
    /// initialization is the host's call to make, not the guest's.
    pub fn load(bytes: &[u8], config: &HostConfig) -> Result<Self> {
        validate_wasm(bytes)?;

        let engine = config.engine();
        let module =
            Module::new(&engine, bytes).map_err(|e| anyhow!("failed to parse module: {e}"))?;
        let exports = text_exports_of(&module);

        let mut store = Store::new(&engine, ());
        if let Some(fuel) = config.fuel {
            store.set_fuel(fuel).context("setting initial fuel")?;
        }

        let linker = Linker::new(&engine);
        // validate_wasm already refused start sections, so nothing runs here
        let instance = linker
            .instantiate_and_start(&mut store, &module)
            .map_err(|e| anyhow!("failed to instantiate module: {e}"))?;

        let memory = instance
            .get_memory(&store, "memory")
            .ok_or_else(|| anyhow!("module does not export `memory`"))?;
        let alloc = instance
            .get_typed_func::<i32, i32>(&store, "alloc")
            .context("resolving `alloc`")?;
        let dealloc = instance
            .get_typed_func::<(i32, i32), ()>(&store, "dealloc")
            .context("resolving `dealloc`")?;
        let hello = instance
            .get_typed_func::<(i32, i32), i32>(&store, EXPORT_NAME)
            .with_context(|| format!("resolving `{EXPORT_NAME}`"))?;

        info!(exports = ?exports, "loaded guest module");

        Ok(Self {
            store,
            memory,
            alloc,
            dealloc,
            hello,
            exports,
            config: config.clone(),
        })
    }

    /// Text-shaped function exports the guest published.
    pub fn exports(&self) -> &[String] {
        &self.exports
    }

    /// Descriptor of the guest's `hello`.
    ///
    /// `load` only succeeds once the guest export has the text ABI shape
    /// `(i32, i32) -> i32`, so this is the registered in-process
    /// descriptor, which that shape encodes.
    pub fn descriptor(&self) -> ExportDescriptor {
        ExportedFunction::hello().describe()
    }

    /// Calls the guest's `hello`, passing `arg` through linear memory.
    pub fn call(&mut self, arg: Option<&str>) -> Result<String> {
        if let Some(fuel) = self.config.fuel {
            self.store.set_fuel(fuel).context("refilling fuel")?;
        }

        let (arg_ptr, arg_len) = match arg {
            None => (0, 0),
            Some(text) => {
                if text.len() > self.config.max_input_len {
                    bail!(
                        "argument is {} bytes, limit is {}",
                        text.len(),
                        self.config.max_input_len
                    );
                }
                let len = guest_len(text.len())?;
                let ptr = self
                    .alloc
                    .call(&mut self.store, len)
                    .context("allocating argument buffer")?;
                if ptr == 0 {
                    bail!("guest returned a null argument buffer");
                }
                self.memory
                    .write(&mut self.store, ptr as u32 as usize, text.as_bytes())
                    .map_err(|e| anyhow!("writing argument into guest memory: {e}"))?;
                (ptr, len)
            }
        };

        debug!(arg_len, "calling guest export");
        let result = self
            .hello
            .call(&mut self.store, (arg_ptr, arg_len))
            .with_context(|| format!("calling `{EXPORT_NAME}`"));

        if arg_ptr != 0 {
            let freed = self.dealloc.call(&mut self.store, (arg_ptr, arg_len));
            match (&result, freed) {
                (_, Ok(())) => {}
                // the call's own failure is the one worth reporting
                (Err(_), Err(e)) => {
                    warn!(error = %e, "failed to free argument after failed call")
                }
                (Ok(_), Err(e)) => return Err(anyhow!("freeing argument buffer: {e}")),
            }
        }

        let out_ptr = result?;
        if out_ptr == 0 {
            bail!("guest returned a null result");
        }
        let text = self.read_prefixed(out_ptr)?;

        let cap = guest_len(LEN_PREFIX + text.len())?;
        self.dealloc
            .call(&mut self.store, (out_ptr, cap))
            .context("freeing result buffer")?;
        Ok(text)
    }

    fn read_prefixed(&self, ptr: i32) -> Result<String> {
        let offset = ptr as u32 as usize;
        let mut prefix = [0u8; LEN_PREFIX];
        self.memory
            .read(&self.store, offset, &mut prefix)
            .map_err(|e| anyhow!("reading result length: {e}"))?;
        let len = u32::from_le_bytes(prefix) as usize;

        let end = offset
            .checked_add(LEN_PREFIX)
            .and_then(|start| start.checked_add(len))
            .ok_or_else(|| anyhow!("result length {len} overflows the guest address space"))?;
        let size = self.memory.data_size(&self.store);
        if end > size {
            bail!("result of {len} bytes at {offset} exceeds guest memory of {size} bytes");
        }

        let mut body = vec![0u8; len];
        self.memory
            .read(&self.store, offset + LEN_PREFIX, &mut body)
            .map_err(|e| anyhow!("reading result body: {e}"))?;
        String::from_utf8(body).context("guest result is not UTF-8")
    }
}

fn guest_len(len: usize) -> Result<i32> {
    i32::try_from(len).map_err(|_| anyhow!("length {len} does not fit the guest ABI"))
}
