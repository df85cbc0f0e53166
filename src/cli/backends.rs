use super::builtin_registry;

pub fn cmd_backends() {
    let registry = builtin_registry();
    for name in registry.list_available() {
        println!("{}", name);
    }
}
