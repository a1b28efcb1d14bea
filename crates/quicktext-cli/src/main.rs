fn main() {
    quicktext_cli::run_main();
}
