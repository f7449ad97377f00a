fn main() {
    if let Err(err) = gains_lib::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
