mod profit;
mod security;
mod shipping;
