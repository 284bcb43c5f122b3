mod app;
mod chart;
mod menu;

fn main() -> anyhow::Result<()> {
    app::run()
}
