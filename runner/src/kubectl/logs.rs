use super::{check_target, namespace_or_placeholder, push_target, CollectorError, KUBECTL};
use common::{template, Bindings, PodLogs};

/// Build `kubectl logs` for a pod logs collector
///
/// Returns the entrypoint and its arguments:
/// `logs --prefix (<name> | -l <selector>) -n <namespace> (--all-containers | -c <container>) [--tail N]`
pub fn logs(bindings: &Bindings, collector: &PodLogs) -> Result<(String, Vec<String>), CollectorError> {
    let name = template::convert_string(&collector.name, bindings)?;
    let namespace = template::convert_string(&collector.namespace, bindings)?;
    let selector = template::convert_string(&collector.selector, bindings)?;
    let container = template::convert_string(&collector.container, bindings)?;
    check_target(&name, &selector)?;

    let mut args = vec!["logs".to_string(), "--prefix".to_string()];
    push_target(&mut args, name, selector);
    args.push("-n".to_string());
    args.push(namespace_or_placeholder(namespace));
    if container.is_empty() {
        args.push("--all-containers".to_string());
    } else {
        args.push("-c".to_string());
        args.push(container);
    }
    if let Some(tail) = collector.tail {
        args.push("--tail".to_string());
        args.push(tail.to_string());
    }

    Ok((KUBECTL.to_string(), args))
}
