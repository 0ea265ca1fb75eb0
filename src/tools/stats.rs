use crate::server::ServerContext;
use crate::tools::load_index::format_stats;

/// Describe the currently installed index.
pub async fn handle_index_stats(context: &ServerContext) -> Result<String, String> {
    let Some(snapshot) = context.state().snapshot().await else {
        return Err("No index loaded. Use load_index first.".to_string());
    };

    let mut output = match &snapshot.source {
        Some(path) => format!("Index source: {}\n\n", path.display()),
        None => "Index source: (built in memory)\n\n".to_string(),
    };
    format_stats(&mut output, &snapshot.index.stats());
    Ok(output)
}
