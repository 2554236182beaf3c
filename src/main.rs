// Beatlane command-line entry point
fn main() {
    std::process::exit(beatlane::run());
}
