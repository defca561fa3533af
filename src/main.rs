fn main() {
    if let Err(err) = survey_import::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
