mod access;
mod lifecycle;
mod propagation;
