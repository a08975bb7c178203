pub mod kubeconfig;
pub mod lab;
pub mod name;
pub mod namespaces;
pub mod notify;
pub mod resources;
pub mod token;
