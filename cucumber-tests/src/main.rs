use cucumber::{cli, World};
use cucumber_tests::features::DocfieldWorld;

#[tokio::main]
async fn main() {
    DocfieldWorld::cucumber()
        .with_cli::<()>(cli::Opts::parsed())
        .run_and_exit("features/")
        .await;
}
