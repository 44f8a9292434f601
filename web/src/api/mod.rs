pub mod jsonrpc;
pub mod router;
pub mod service;

#[cfg(test)]
mod test;
