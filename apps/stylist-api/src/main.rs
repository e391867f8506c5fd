use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = stylist_api::Args::parse();

	stylist_api::run(args).await
}
