mod demo;

fn main() -> anyhow::Result<()> {
    spatula_cli::run(demo::registry())
}
