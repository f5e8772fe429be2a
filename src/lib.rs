pub mod mr;
pub mod mrapps;
pub mod mrrt;

#[cfg(test)]
mod test_mr;
