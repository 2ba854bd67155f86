pub mod session_list;
