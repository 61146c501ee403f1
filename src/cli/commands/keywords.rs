use crate::config::Config;

pub fn cmd_keywords(config: &Config) {
    let query = &config.query;

    println!("Search Keywords ({} total)", query.keywords.len());
    println!("{:-<70}", "");

    for keyword in &query.keywords {
        println!("• {keyword}");
    }

    println!();
    println!(
        "max_results: {} | strict_mode: {} | loose_phrases: {}",
        query.max_results, query.strict_mode, query.loose_phrases
    );
}
