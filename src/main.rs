fn main() {
    if let Err(e) = locframe::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
