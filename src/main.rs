fn main() {
    if let Err(err) = autoprice::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
