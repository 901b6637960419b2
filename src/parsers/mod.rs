pub mod html;
pub mod links;
pub mod text;

#[cfg(test)]
mod tests;

pub use html::to_markdown;
pub use links::extract_links;
