use bloom_app::app::BloomApp;

fn main() -> anyhow::Result<()> {
    BloomApp::run()
}
