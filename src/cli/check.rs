use hlsgen::Role;

use super::builtin_registry;

/// Build every backend and print its role → kinds table.
pub fn cmd_check() {
    let registry = builtin_registry();
    for name in registry.list_available() {
        let Ok(backend) = registry.get(name) else {
            continue;
        };
        println!("{} ({})", name, backend.dialect());
        for role in Role::ALL {
            let kinds = backend.kinds(role);
            if kinds.is_empty() {
                continue;
            }
            let kinds: Vec<&str> = kinds.iter().map(|k| k.as_str()).collect();
            println!("  {:<14} {}", role.as_str(), kinds.join(", "));
        }
    }
    eprintln!("OK: {} backends", registry.list_available().len());
}
