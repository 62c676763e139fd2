pub mod scholar_search;
