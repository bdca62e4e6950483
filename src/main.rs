fn main() -> anyhow::Result<()> {
    daybook_lib::run()
}
