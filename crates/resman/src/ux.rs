use console::style;
use resman_core::ResourceError;

/// Prints an error, with the service's code and details when it came from a fault.
pub fn present_error(error: anyhow::Error) {
    let error_text = style("ERROR:").red().bold();
    eprintln!("\n{error_text} {error:#}");

    let cloud = error
        .chain()
        .find_map(|cause| cause.downcast_ref::<ResourceError>())
        .and_then(ResourceError::as_cloud_error);
    if let Some(cloud) = cloud {
        eprintln!("{}", style(format!("  status: {}", cloud.status)).dim());
        for detail in &cloud.details {
            let code = detail.code.as_deref().unwrap_or("-");
            let message = detail.message.as_deref().unwrap_or("");
            eprintln!("{}", style(format!("  {code}: {message}")).dim());
        }
    }
}

pub fn present_success(message: &str) {
    eprintln!("{} {message}", style("✔").green().bold());
}
