fn main() -> anyhow::Result<()> {
    trustbook_cli::cli::run()
}
