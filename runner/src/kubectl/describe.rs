use super::{check_target, map_resource, namespace_or_placeholder, push_target, CollectorError, KUBECTL};
use crate::cluster::ResourceMapper;
use common::{template, Bindings, Command, Describe};

/// Build `kubectl describe` for a describe collector
///
/// Cluster-scoped resources get no namespace flags; otherwise `*` selects
/// every namespace. The result carries the target cluster and timeout.
pub async fn describe(
    mapper: &dyn ResourceMapper,
    bindings: &Bindings,
    collector: &Describe,
) -> Result<Command, CollectorError> {
    let name = template::convert_string(&collector.name, bindings)?;
    let namespace = template::convert_string(&collector.namespace, bindings)?;
    let selector = template::convert_string(&collector.selector, bindings)?;
    let cluster = template::convert_string(&collector.cluster, bindings)?;
    check_target(&name, &selector)?;

    let (resource, cluster_scoped) = map_resource(mapper, bindings, &collector.resource).await?;

    let mut args = vec!["describe".to_string(), resource];
    push_target(&mut args, name, selector);
    if !cluster_scoped {
        if namespace == "*" {
            args.push("--all-namespaces".to_string());
        } else {
            args.push("-n".to_string());
            args.push(namespace_or_placeholder(namespace));
        }
    }
    if let Some(show_events) = collector.show_events {
        args.push(format!("--show-events={}", show_events));
    }

    Ok(Command {
        entrypoint: KUBECTL.to_string(),
        args,
        cluster,
        timeout_secs: collector.timeout_secs,
    })
}
