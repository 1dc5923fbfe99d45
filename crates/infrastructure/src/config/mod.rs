mod loader;

pub use loader::YamlConfigSource;
