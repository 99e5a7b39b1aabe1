//! `toymap`: a small command-line driver over the textual netlist format
//! in [`netlist`], dispatching to the five named passes of `tmap::pass`
//! (spec.md §6).
//!
//! ```text
//! toymap toymap -lut 4 -depth_cuts -emit_luts in.net out.net
//! toymap lutdepth -target 7 in.net out.net
//! toymap lutrewrite in.net out.net
//! ```

mod netlist;

use std::fs;
use std::process::ExitCode;

use tmap::Module;

fn usage() -> ! {
    eprintln!(
        "usage: toymap <toymap|lutdepth|lutnot|lutrewrite_once|lutrewrite> [flags...] <input.net> <output.net>"
    );
    std::process::exit(2)
}

fn read_module(path: &str) -> Module {
    let text = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("error reading {path}: {e}");
        std::process::exit(1)
    });
    netlist::parse(&text).unwrap_or_else(|e| {
        eprintln!("error parsing {path}: {e}");
        std::process::exit(1)
    })
}

fn write_module(module: &Module, path: &str) {
    if let Err(e) = fs::write(path, netlist::write(module)) {
        eprintln!("error writing {path}: {e}");
        std::process::exit(1);
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let argv: Vec<String> = std::env::args().skip(1).collect();
    if argv.len() < 3 {
        usage()
    }
    let pass_name = &argv[0];
    let input_path = &argv[argv.len() - 2];
    let output_path = &argv[argv.len() - 1];
    let flags = &argv[1..argv.len() - 2];

    // Spec.md §7: "Unknown command flag (toymap): fatal error with
    // message." — every pass below surfaces `TmapError` the same way.
    let result = match pass_name.as_str() {
        "toymap" => {
            let module = read_module(input_path);
            tmap::toymap(&module, flags).map(|(out, dump)| {
                if let Some(d) = dump {
                    print!("{d}");
                }
                out
            })
        }
        "lutdepth" => {
            let mut module = read_module(input_path);
            tmap::lutdepth(&mut module, flags).map(|report| {
                if !report.is_empty() {
                    println!("{report}");
                }
                module
            })
        }
        "lutnot" => {
            let mut module = read_module(input_path);
            tmap::lutnot(&mut module).map(|_| module)
        }
        "lutrewrite_once" => {
            let mut module = read_module(input_path);
            tmap::lutrewrite_once(&mut module, flags).map(|_| module)
        }
        "lutrewrite" => {
            let mut module = read_module(input_path);
            tmap::lutrewrite_pass(&mut module, flags).map(|_| module)
        }
        other => {
            eprintln!("unknown pass: {other}");
            usage()
        }
    };

    match result {
        Ok(module) => {
            write_module(&module, output_path);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}
