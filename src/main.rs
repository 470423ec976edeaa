fn main() -> anyhow::Result<()> {
    neural_field::run()
}
