use alloy_sol_types::sol;

sol! {
    /// Employer funded the payroll pool
    #[derive(Debug, PartialEq, Eq)]
    event FundsDeposited(address indexed initiator, uint256 amount);

    /// Salary paid from an employer to an employee
    #[derive(Debug, PartialEq, Eq)]
    event PaymentSent(address indexed initiator, address indexed recipient, uint256 amount);

    /// Employee hired onto an employer's payroll
    #[derive(Debug, PartialEq, Eq)]
    event MemberAdded(address indexed initiator, address indexed recipient, string name, uint256 rate);

    #[derive(Debug, PartialEq, Eq)]
    event MemberRemoved(address indexed initiator, address indexed recipient);

    #[derive(Debug, PartialEq, Eq)]
    event RateChanged(address indexed initiator, address indexed recipient, uint256 new_rate);

    /// Lottery payout to an employee
    #[derive(Debug, PartialEq, Eq)]
    event BonusAwarded(address indexed recipient, uint256 amount);

    interface IPayroll {
        function depositFunds(uint256 amount) external;

        function addEmployee(address employee, string calldata name, uint256 rate) external;

        function removeEmployee(address employee) external;

        function updateRate(address employee, uint256 new_rate) external;

        function payEmployee(address employee) external;

        function employerBalance(address employer) external view returns (uint256);

        function token() external view returns (address);
    }
}
