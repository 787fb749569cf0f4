pub mod governance;
