use std::process::ExitCode;

fn main() -> ExitCode {
    match reimburse_lib::run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
