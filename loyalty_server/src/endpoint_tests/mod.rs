mod balance;
mod flow;
mod helpers;
mod mocks;
mod orders;
