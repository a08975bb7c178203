pub mod form;
pub mod k8s;
pub mod lab;
