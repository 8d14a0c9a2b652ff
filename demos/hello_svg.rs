use gosub_svg::config::EngineConfig;
use gosub_svg::render::backends::software::SoftwareDevice;
use gosub_svg::style::Color;
use gosub_svg::{EngineError, RenderEngine};

const LOGO: &str = r##"
<svg xmlns="http://www.w3.org/2000/svg" width="200" height="120" viewBox="0 0 100 60">
  <g fill="#3b82f6" stroke="#1e3a8a" stroke-width="2">
    <rect x="5" y="5" width="40" height="40" rx="6"/>
    <circle cx="70" cy="25" r="20" fill="orange" fill-opacity="0.8"/>
  </g>
  <path d="M5 55 Q50 35 95 55" fill="none" stroke="crimson" stroke-linecap="round"/>
  <text x="10" y="58">ignored</text>
</svg>
"##;

fn main() -> Result<(), EngineError> {
    env_logger::init();

    // Configure the engine through the engine config builder.
    let cfg = EngineConfig::builder()
        .clear_color(Color::WHITE)
        .build()
        .expect("Configuration is not valid");

    // Software rasterizer honouring the anti-alias setting of the config.
    let device = SoftwareDevice::from_config(&cfg);
    let mut engine = RenderEngine::new(Some(cfg), Box::new(device))?;

    // Nothing gets parsed until the first render.
    engine.set_source(LOGO);
    let buffer = engine.render()?;

    for diagnostic in engine.diagnostics() {
        println!("diagnostic: {diagnostic}");
    }

    let out = std::env::args().nth(1).unwrap_or_else(|| "hello_svg.png".into());
    let file = std::fs::File::create(&out).map_err(|e| EngineError::Backend(e.into()))?;
    buffer.write_png(std::io::BufWriter::new(file))?;
    println!("wrote {}x{} image to {out}", buffer.width, buffer.height);

    Ok(())
}
