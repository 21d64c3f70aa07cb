use std::process::ExitCode;

fn main() -> ExitCode {
    intake_agreement_lib::run()
}
