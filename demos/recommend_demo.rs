use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    article_recs::example_apps::run_recommend_demo(std::env::args().skip(1))
}
