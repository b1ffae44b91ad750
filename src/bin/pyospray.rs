//! Embedded interpreter with the `ospray` module built in

use std::fs;
use std::path::PathBuf;

use ospray::bindings::ospray_module;
use ospray::config::{Config, LIBRARY_ENV};
use pyo3::prelude::*;
use pyo3::types::PyList;

#[derive(Debug, Clone)]
struct RunConfig {
    script: PathBuf,
    /// `sys.argv`, script path first
    argv: Vec<String>,
    library: Option<PathBuf>,
}

enum Command {
    Run(RunConfig),
    PrintConfig,
}

fn usage(program: &str) -> String {
    format!(
        "Usage: {} [OPTIONS] <script.py> [ARGS]...\n\nOptions:\n  \
         --library PATH   Load the OSPRay shared library from PATH\n  \
         --print-config   Print a default pyospray.toml and exit",
        program
    )
}

fn parse_args() -> Result<Command, String> {
    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("pyospray");

    let mut library = None;
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--print-config" => return Ok(Command::PrintConfig),
            "--library" => {
                i += 1;
                let path = args
                    .get(i)
                    .ok_or_else(|| "--library requires an argument".to_string())?;
                library = Some(PathBuf::from(path));
            }
            "-h" | "--help" => return Err(usage(program)),
            arg if arg.starts_with("--") => {
                return Err(format!("Unknown option: {}\n\n{}", arg, usage(program)));
            }
            script => {
                return Ok(Command::Run(RunConfig {
                    script: PathBuf::from(script),
                    argv: args[i..].to_vec(),
                    library,
                }));
            }
        }
        i += 1;
    }

    Err(usage(program))
}

fn run(config: RunConfig) -> Result<(), String> {
    let source = fs::read_to_string(&config.script)
        .map_err(|e| format!("Failed to read {}: {}", config.script.display(), e))?;

    if let Some(library) = &config.library {
        // read once by the lazy library loader, before any script code runs
        std::env::set_var(LIBRARY_ENV, library);
    }

    pyo3::append_to_inittab!(ospray_module);
    pyo3::prepare_freethreaded_python();

    Python::with_gil(|py| -> PyResult<()> {
        let sys = py.import("sys")?;
        sys.setattr("argv", PyList::new(py, &config.argv))?;

        let main = py.import("__main__")?;
        let globals = main.dict();
        globals.set_item("__file__", config.script.to_string_lossy().as_ref())?;
        py.run(&source, Some(globals), None)
    })
    .map_err(|e| {
        Python::with_gil(|py| e.print(py));
        format!("Script {} failed", config.script.display())
    })
}

fn main() {
    let result = match parse_args() {
        Ok(Command::PrintConfig) => {
            print!("{}", Config::generate_default());
            Ok(())
        }
        Ok(Command::Run(config)) => run(config),
        Err(e) => Err(e),
    };

    ospray::logging::flush();

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
