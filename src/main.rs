fn main() -> anyhow::Result<()> {
    vbscript_translator::run()
}
