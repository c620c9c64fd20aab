use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use anyhow::{Context, Result, bail};
use clap::Parser;
use lng_core::{Source, compile_asm};

/// Build driver for the LNG compiler: compiles a `.lng` source to NASM
/// assembly, then hands the text to `nasm` and `ld`.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[arg(short, long, help = "Source file to compile (defaults to stdin)")]
    input: Option<String>,

    #[arg(
        short,
        long,
        value_name = "PATH",
        help = "Output file or directory (required when reading from stdin)"
    )]
    output: Option<String>,

    #[arg(
        long,
        value_name = "FORMAT",
        default_value = "bin",
        help = "Output format: asm (assembly text only), bin (assemble and link)"
    )]
    emit: String,

    #[arg(long, help = "Run the program after successful compilation")]
    run: bool,

    #[arg(last = true, help = "Arguments forwarded to the program with --run")]
    program_args: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    execute(cli)
}

enum EmitFormat {
    Asm,
    Bin,
}

fn execute(cli: Cli) -> Result<()> {
    let format = match cli.emit.as_str() {
        "asm" => EmitFormat::Asm,
        "bin" => EmitFormat::Bin,
        other => bail!("unsupported emit format: {other}"),
    };

    let (source, basepath) = load_source(&cli)?;

    let asm = match compile_asm(&source) {
        Ok(asm) => asm,
        Err(err) => {
            eprintln!("{}", err.render(&source));
            std::process::exit(1);
        }
    };

    let asm_path = with_appended_extension(&basepath, "asm");
    write_output(&asm_path, asm.as_bytes())?;

    match format {
        EmitFormat::Asm => {
            if cli.run {
                eprintln!("--run is ignored for asm outputs");
            }
        }
        EmitFormat::Bin => {
            let obj_path = with_appended_extension(&basepath, "o");
            let status = run_command(
                Command::new("nasm")
                    .arg("-felf64")
                    .arg(&asm_path)
                    .arg("-o")
                    .arg(&obj_path),
            )?;
            if !status.success() {
                bail!("nasm exited with {status}");
            }

            let status =
                run_command(Command::new("ld").arg("-o").arg(&basepath).arg(&obj_path))?;
            if !status.success() {
                bail!("ld exited with {status}");
            }

            if cli.run {
                let status = run_command(Command::new(runnable(&basepath)).args(&cli.program_args))?;
                std::process::exit(status.code().unwrap_or(1));
            }
        }
    }

    Ok(())
}

fn load_source(cli: &Cli) -> Result<(Source, PathBuf)> {
    match &cli.input {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read input file {path}"))?;
            let input = Path::new(path);
            let name = input
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.clone());
            let basepath = derive_basepath(input, cli.output.as_deref());
            Ok((Source::new(name, text), basepath))
        }
        None => {
            let output = cli
                .output
                .as_deref()
                .context("--output is required when reading from stdin")?;
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            let basepath = derive_basepath(Path::new("out.lng"), Some(output));
            Ok((Source::new("<stdin>", text), basepath))
        }
    }
}

/// Pick the path all produced files hang off: strip the `.lng` extension
/// from the input name, and honor `--output` as either a target file or a
/// directory to place the outputs in.
fn derive_basepath(input: &Path, output: Option<&str>) -> PathBuf {
    let stem = input
        .file_name()
        .map(|n| {
            let name = n.to_string_lossy();
            name.strip_suffix(".lng")
                .map(str::to_owned)
                .unwrap_or_else(|| name.into_owned())
        })
        .unwrap_or_else(|| "out".to_string());

    match output {
        Some(path) => {
            let path = Path::new(path);
            if path.is_dir() {
                path.join(stem)
            } else {
                path.to_path_buf()
            }
        }
        None => input.parent().unwrap_or_else(|| Path::new("")).join(stem),
    }
}

/// `basepath` plus `.ext`, appended rather than substituted so an
/// `--output` name keeps whatever extension the user gave it.
fn with_appended_extension(basepath: &Path, ext: &str) -> PathBuf {
    PathBuf::from(format!("{}.{ext}", basepath.display()))
}

/// A bare file name would be looked up on PATH when spawned; anchor it to
/// the current directory instead.
fn runnable(path: &Path) -> PathBuf {
    if path.components().count() == 1 {
        Path::new(".").join(path)
    } else {
        path.to_path_buf()
    }
}

fn run_command(command: &mut Command) -> Result<ExitStatus> {
    let mut rendered = command.get_program().to_string_lossy().into_owned();
    for arg in command.get_args() {
        rendered.push(' ');
        rendered.push_str(&arg.to_string_lossy());
    }
    println!("[CMD] {rendered}");
    command
        .status()
        .with_context(|| format!("failed to spawn {rendered}"))
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {parent:?}"))?;
        }
    }
    fs::write(path, bytes).with_context(|| format!("failed to write output file {path:?}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_cmd::Command;
    use predicates::prelude::*;
    use tempfile::tempdir;

    #[test]
    fn compiles_source_to_asm() {
        let dir = tempdir().expect("tempdir");
        let input_path = dir.path().join("input.lng");
        fs::write(&input_path, "int x = 2 + 3\nprint(x)\n").expect("write input");
        let base_path = dir.path().join("prog");

        Command::cargo_bin("lng-cli")
            .expect("binary exists")
            .arg("--input")
            .arg(&input_path)
            .arg("--output")
            .arg(&base_path)
            .arg("--emit")
            .arg("asm")
            .assert()
            .success();

        let asm = fs::read_to_string(dir.path().join("prog.asm")).expect("read asm");
        assert!(asm.contains("global _start"));
        assert!(asm.contains("call    print"));
        assert!(asm.contains("mem: resb 8"));
    }

    #[test]
    fn derives_output_path_from_the_input() {
        let dir = tempdir().expect("tempdir");
        let input_path = dir.path().join("demo.lng");
        fs::write(&input_path, "print(7)\n").expect("write input");

        Command::cargo_bin("lng-cli")
            .expect("binary exists")
            .arg("--input")
            .arg(&input_path)
            .arg("--emit")
            .arg("asm")
            .assert()
            .success();

        assert!(dir.path().join("demo.asm").exists(), "asm was not created");
    }

    #[test]
    fn accepts_a_directory_output() {
        let dir = tempdir().expect("tempdir");
        let input_path = dir.path().join("demo.lng");
        fs::write(&input_path, "print(7)\n").expect("write input");
        let out_dir = dir.path().join("build");
        fs::create_dir_all(&out_dir).expect("create out dir");

        Command::cargo_bin("lng-cli")
            .expect("binary exists")
            .arg("--input")
            .arg(&input_path)
            .arg("--output")
            .arg(&out_dir)
            .arg("--emit")
            .arg("asm")
            .assert()
            .success();

        assert!(out_dir.join("demo.asm").exists(), "asm was not created");
    }

    #[test]
    fn reads_source_from_stdin() {
        let dir = tempdir().expect("tempdir");
        let base_path = dir.path().join("piped");

        Command::cargo_bin("lng-cli")
            .expect("binary exists")
            .arg("--output")
            .arg(&base_path)
            .arg("--emit")
            .arg("asm")
            .write_stdin("print(7)\n")
            .assert()
            .success();

        assert!(dir.path().join("piped.asm").exists(), "asm was not created");
    }

    #[test]
    fn stdin_requires_an_output_path() {
        Command::cargo_bin("lng-cli")
            .expect("binary exists")
            .arg("--emit")
            .arg("asm")
            .write_stdin("print(7)\n")
            .assert()
            .failure()
            .stderr(predicate::str::contains(
                "--output is required when reading from stdin",
            ));
    }

    #[test]
    fn reports_illegal_characters_with_a_caret() {
        let dir = tempdir().expect("tempdir");
        let input_path = dir.path().join("input.lng");
        fs::write(&input_path, "print(2 $ 3)\n").expect("write input");

        Command::cargo_bin("lng-cli")
            .expect("binary exists")
            .arg("--input")
            .arg(&input_path)
            .arg("--emit")
            .arg("asm")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Illegal Character: '$'"))
            .stderr(predicate::str::contains("File input.lng, line 1"))
            .stderr(predicate::str::contains("^"));
    }

    #[test]
    fn reports_undefined_variables() {
        let dir = tempdir().expect("tempdir");
        let input_path = dir.path().join("input.lng");
        fs::write(&input_path, "x = 1\n").expect("write input");

        Command::cargo_bin("lng-cli")
            .expect("binary exists")
            .arg("--input")
            .arg(&input_path)
            .arg("--emit")
            .arg("asm")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Variable not defined: 'x'"));
    }

    #[test]
    fn reports_syntax_errors() {
        let dir = tempdir().expect("tempdir");
        let input_path = dir.path().join("input.lng");
        fs::write(&input_path, "1 +\n").expect("write input");

        Command::cargo_bin("lng-cli")
            .expect("binary exists")
            .arg("--input")
            .arg(&input_path)
            .arg("--emit")
            .arg("asm")
            .assert()
            .failure()
            .stderr(predicate::str::contains(
                "Invalid Syntax: Expected int or float",
            ));
    }

    #[test]
    fn warns_that_run_is_ignored_for_asm_output() {
        let dir = tempdir().expect("tempdir");
        let input_path = dir.path().join("input.lng");
        fs::write(&input_path, "print(7)\n").expect("write input");

        Command::cargo_bin("lng-cli")
            .expect("binary exists")
            .arg("--input")
            .arg(&input_path)
            .arg("--emit")
            .arg("asm")
            .arg("--run")
            .assert()
            .success()
            .stderr(predicate::str::contains("--run is ignored for asm outputs"));
    }

    #[test]
    fn rejects_unknown_emit_formats() {
        let dir = tempdir().expect("tempdir");
        let input_path = dir.path().join("input.lng");
        fs::write(&input_path, "print(7)\n").expect("write input");

        Command::cargo_bin("lng-cli")
            .expect("binary exists")
            .arg("--input")
            .arg(&input_path)
            .arg("--emit")
            .arg("elf")
            .assert()
            .failure()
            .stderr(predicate::str::contains("unsupported emit format: elf"));
    }
}
