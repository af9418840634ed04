pub mod tag_search;
