mod health_check;
mod helpers;
mod shared_store;
