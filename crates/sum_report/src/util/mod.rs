pub mod env_var;
