use std::process::ExitCode;

fn main() -> ExitCode {
    proctime::run()
}
